fn main() {
    if let Err(err) = hawkwatch_lib::run() {
        eprintln!("hawkwatch: {err:#}");
        std::process::exit(1);
    }
}
