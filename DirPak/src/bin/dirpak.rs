fn main() -> anyhow::Result<()> {
    dirpak::cli::run_cli()
}
