fn main() {
    if let Err(err) = contact_vault::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
