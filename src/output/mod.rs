mod styling;

use std::path::Path;

use styling::{bright_green, dim, magenta_bold};

/// Prints the `jenviz` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("jenviz"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins job graph visualizer")
    );
}

/// Reports the rendered file on stdout.
pub fn print_output_path(path: &Path) {
    println!("{} {}", bright_green("graph written to"), path.display());
}
