mod app;
mod controller;
mod input;
mod renderer;
mod settings;

fn main() {
    app::run();
}
