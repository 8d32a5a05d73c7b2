use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    sortpick::apps::run_serve(std::env::args().skip(1))
}
