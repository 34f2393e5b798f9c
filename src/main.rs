fn main() {
    #[cfg(feature = "cli")]
    polymux::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("polymux: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
