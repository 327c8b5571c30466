fn main() {
    if let Err(err) = covenant::run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
