fn main() -> std::process::ExitCode {
    flywheel_cli::run()
}
