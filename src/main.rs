fn main() {
    #[cfg(feature = "cli")]
    logic2vcd::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("logic2vcd: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
