use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    sortpick::apps::run_train(std::env::args().skip(1))
}
