use ar_placement_engine::engine::core::app_config::AppConfig;
use ar_placement_engine::engine::core::app_setup::create_app;

fn main() {
    let mut app = create_app(app_config());

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

/// Native builds take `[model_url] [settings_path]` from the command line.
#[cfg(not(target_arch = "wasm32"))]
fn app_config() -> AppConfig {
    let mut args = std::env::args().skip(1);
    let mut config = AppConfig::default();
    if let Some(url) = args.next() {
        config = config.with_model_url(url);
    }
    if let Some(path) = args.next() {
        config = config.with_settings_path(path);
    }
    config
}

#[cfg(target_arch = "wasm32")]
fn app_config() -> AppConfig {
    AppConfig::default()
}
