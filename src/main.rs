fn main() {
    if let Err(err) = ocrlabel::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
