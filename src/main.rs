fn main() {
    if let Err(err) = md_dtypes::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
