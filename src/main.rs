fn main() {
    if let Err(err) = csv_col_splitter::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
