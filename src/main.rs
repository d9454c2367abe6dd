fn main() {
    std::process::exit(sea_qa::cli::run());
}
