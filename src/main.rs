fn main() -> std::process::ExitCode {
    predictdesk_lib::run()
}
