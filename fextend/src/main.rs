use clap::Parser;
use fextend_lib::fe_render::fe_page;
use std::fs;

#[derive(Parser)]
#[command(name = "fextend")]
#[command(about = "Render serialized block content with scoped per-block custom CSS")]
struct Args {
    /// Input file containing serialized block content.
    input: String,

    /// Output file; the rendered page goes to stdout when omitted.
    output: Option<String>,
}

fn main() {
    env_logger::init();

    let args: Args = Args::parse();

    match fs::read_to_string(&args.input) {
        Ok(content) => {
            let page = fe_page::generate(&content);
            match &args.output {
                Some(path) => {
                    if let Err(e) = fs::write(path, &page) {
                        eprintln!("Error writing output file: {}", e);
                        std::process::exit(1);
                    }
                }
                None => print!("{}", page),
            }
        }
        Err(e) => {
            eprintln!("Error reading content file: {}", e);
            std::process::exit(1);
        }
    }
}
