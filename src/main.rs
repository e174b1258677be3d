#[cfg(not(target_arch = "wasm32"))]
fn init_tracing() {
    // Dioxus installs its own logger at launch unless one is already set.
    if let Err(err) = tracing_subscriber::fmt().with_target(false).try_init() {
        eprintln!("tracing already initialized: {err}");
    }
}

#[cfg(target_arch = "wasm32")]
fn init_tracing() {}

fn main() {
    init_tracing();
    dioxus::launch(ragchat::ui::App);
}
