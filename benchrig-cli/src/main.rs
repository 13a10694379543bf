//! benchrig binary entry point.

fn main() -> anyhow::Result<()> {
    benchrig_cli::run()
}
