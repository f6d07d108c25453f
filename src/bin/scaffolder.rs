fn main() -> anyhow::Result<()> {
    scaffolder::cli::run_cli()
}
