mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::{
    iframe_env, launch_url, native_app, native_env, RecordingHost, DARK_THEME, LIGHT_THEME,
};
use serde_json::json;
use twa_bridge::{
    events::{Event, Listener},
    storage::MemoryStorage,
    webapp::{ColorScheme, SettableColorKey},
    BridgeConfig, BridgeError, Precondition,
};

#[test]
fn init_reads_launch_metadata() {
    let (_host, app) = native_app("6.2");
    assert_eq!(app.platform(), "tdesktop");
    assert_eq!(app.version().as_str(), "6.2");
    assert_eq!(app.init_data().user().map(|u| u.id), Some(1));
    assert_eq!(app.theme().background_color(), Some("#17212b"));
    assert_eq!(app.viewport_height(), 640.0);
    assert_eq!(app.viewport_stable_height(), 640.0);
    assert!(!app.is_expanded());
}

#[test]
fn init_fails_without_launch_parameters() {
    let host = RecordingHost::new();
    let env = native_env(&host, "https://app.example/#tgWebAppVersion=6.2");
    let err = match twa_bridge::init(env, BridgeConfig::default()) {
        Ok(_) => panic!("launch data is missing"),
        Err(err) => err,
    };
    match err {
        BridgeError::Parse(parse) => assert_eq!(parse.field_key(), Some("tgWebAppData")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn bare_commands_send_empty_payloads() {
    let (host, app) = native_app("6.0");
    app.ready().unwrap();
    app.expand().unwrap();
    app.close().unwrap();
    assert_eq!(host.sent_events(), vec!["web_app_ready", "web_app_expand", "web_app_close"]);
    assert!(host.sent().iter().all(|s| s.data == json!("")));
}

#[test]
fn send_data_checks_the_byte_size() {
    let (host, app) = native_app("6.0");
    app.send_data("payload").unwrap();
    assert_eq!(host.last().data, json!({ "data": "payload" }));

    let empty = app.send_data("").unwrap_err();
    assert!(matches!(
        empty,
        BridgeError::PreconditionFailed(Precondition::LengthOutOfRange { len: 0, .. })
    ));
    // 2049 two-byte characters exceed 4096 bytes.
    let wide = "é".repeat(2049);
    assert!(app.send_data(&wide).is_err());
    assert!(app.send_data(&"a".repeat(4096)).is_ok());
}

#[test]
fn links_use_the_host_event_from_six_one() {
    let (host, app) = native_app("6.1");
    app.open_link("https://example.org/page?x=1").unwrap();
    assert_eq!(host.last().event, "web_app_open_link");
    assert_eq!(host.last().data, json!({ "url": "https://example.org/page?x=1" }));
    assert!(host.opened().is_empty());
}

#[test]
fn links_open_a_window_on_older_hosts() {
    let (host, app) = native_app("6.0");
    app.open_link("https://example.org/").unwrap();
    assert_eq!(host.opened(), vec!["https://example.org/"]);
    assert!(host.sent().is_empty());

    let err = app.open_link("javascript:alert(1)").unwrap_err();
    assert!(matches!(
        err,
        BridgeError::PreconditionFailed(Precondition::UrlNotAllowed { .. })
    ));
}

#[test]
fn telegram_links_send_path_and_query() {
    let (host, app) = native_app("6.1");
    app.open_telegram_link("https://t.me/some_bot?start=abc").unwrap();
    assert_eq!(host.last().event, "web_app_open_tg_link");
    assert_eq!(host.last().data, json!({ "url": "/some_bot?start=abc" }));

    let err = app.open_telegram_link("https://example.org/x").unwrap_err();
    assert!(matches!(
        err,
        BridgeError::PreconditionFailed(Precondition::UrlNotAllowed { .. })
    ));
}

#[test]
fn telegram_links_navigate_on_old_native_hosts() {
    let (host, app) = native_app("6.0");
    app.open_telegram_link("https://t.me/channel").unwrap();
    assert_eq!(host.navigated(), vec!["https://t.me/channel"]);
}

#[test]
fn telegram_links_use_the_event_inside_an_iframe_even_on_six_zero() {
    let host = RecordingHost::new();
    let env = iframe_env(&host, &launch_url("6.0", DARK_THEME, &[]));
    let app = twa_bridge::init(env, BridgeConfig::default()).unwrap();
    app.open_telegram_link("https://t.me/channel").unwrap();
    assert_eq!(host.last().event, "web_app_open_tg_link");
    assert_eq!(host.last().data, json!({ "url": "/channel" }));
}

#[test]
fn header_color_follows_the_theme_key() {
    let (host, app) = native_app("6.1");
    assert_eq!(app.header_color().as_deref(), Some("#17212b"));

    app.set_header_color(SettableColorKey::SecondaryBgColor).unwrap();
    assert_eq!(host.last().data, json!({ "color_key": "secondary_bg_color" }));
    assert_eq!(app.header_color().as_deref(), Some("#232e3c"));

    // Unchanged key sends nothing.
    host.clear();
    app.set_header_color(SettableColorKey::SecondaryBgColor).unwrap();
    assert!(host.sent().is_empty());
}

#[test]
fn background_color_accepts_keys_and_any_rgb_notation() {
    let (host, app) = native_app("6.1");

    app.set_background_color("rgb(255,0,0)").unwrap();
    assert_eq!(host.last().data, json!({ "color": "#ff0000" }));
    assert_eq!(app.background_color().as_deref(), Some("#ff0000"));

    host.clear();
    app.set_background_color("#f00").unwrap();
    app.set_background_color("#FF0000").unwrap();
    assert!(host.sent().is_empty(), "same color after normalization");

    app.set_background_color("bg_color").unwrap();
    assert_eq!(host.last().data, json!({ "color": "bg_color" }));
    assert_eq!(app.background_color().as_deref(), Some("#17212b"));

    assert!(matches!(
        app.set_background_color("red").unwrap_err(),
        BridgeError::Color(_)
    ));
}

#[test]
fn closing_confirmation_toggles() {
    let (host, app) = native_app("6.2");
    app.enable_closing_confirmation().unwrap();
    assert!(app.is_closing_confirmation_enabled());
    assert_eq!(host.last().event, "web_app_setup_closing_behavior");
    assert_eq!(host.last().data, json!({ "need_confirmation": true }));

    app.disable_closing_confirmation().unwrap();
    assert!(!app.is_closing_confirmation_enabled());
}

#[test]
fn color_scheme_follows_the_background() {
    let (_host, dark) = native_app("6.0");
    assert_eq!(dark.color_scheme(), ColorScheme::Dark);

    let host = RecordingHost::new();
    let env = native_env(&host, &launch_url("6.0", LIGHT_THEME, &[]));
    let light = twa_bridge::init(env, BridgeConfig::default()).unwrap();
    assert_eq!(light.color_scheme(), ColorScheme::Light);
    assert_eq!(light.color_scheme().to_string(), "light");

    let env = native_env(&host, &launch_url("6.0", "{}", &[]));
    let bare = twa_bridge::init(env, BridgeConfig::default()).unwrap();
    assert_eq!(bare.color_scheme(), ColorScheme::Dark);
}

#[test]
fn theme_changes_update_state_and_persist() {
    let host = RecordingHost::new();
    let session = Arc::new(MemoryStorage::new());
    let location = launch_url("6.1", DARK_THEME, &[]);
    let env = native_env(&host, &location).with_storage(session.clone());
    let app = twa_bridge::init(env, BridgeConfig::default()).unwrap();

    host.fire(
        "theme_changed",
        Some(json!({ "theme_params": { "bg_color": "#ffffff", "text_color": "#000" } })),
    )
    .unwrap();
    assert_eq!(app.theme().background_color(), Some("#ffffff"));
    assert_eq!(app.theme().text_color(), Some("#000000"));
    assert_eq!(app.color_scheme(), ColorScheme::Light);

    // A reload in the same session prefers the persisted theme.
    let env = native_env(&host, &location).with_storage(session);
    let reloaded = twa_bridge::init(env, BridgeConfig::default()).unwrap();
    assert_eq!(reloaded.theme().background_color(), Some("#ffffff"));
}

#[test]
fn viewport_changes_track_stable_height() {
    let (host, app) = native_app("6.0");
    host.fire(
        "viewport_changed",
        Some(json!({ "height": 500, "is_expanded": false, "is_state_stable": false })),
    )
    .unwrap();
    assert_eq!(app.viewport_height(), 500.0);
    assert_eq!(app.viewport_stable_height(), 640.0);

    host.fire(
        "viewport_changed",
        Some(json!({ "height": 800, "is_expanded": true, "is_state_stable": true })),
    )
    .unwrap();
    assert_eq!(app.viewport_stable_height(), 800.0);
    assert!(app.is_expanded());
}

#[test]
fn main_button_starts_with_theme_colors_and_syncs_on_change() {
    let (host, app) = native_app("6.0");
    let button = app.main_button();
    assert_eq!(button.text(), "CONTINUE");
    assert_eq!(button.color(), "#5288c1");
    assert_eq!(button.text_color(), "#ffffff");
    assert!(!button.is_visible());
    assert!(button.is_active());
    assert!(host.sent().is_empty());

    button.set_text("  Pay  ").unwrap().show().unwrap();
    assert_eq!(host.sent().len(), 2);
    assert_eq!(
        host.last().data,
        json!({
            "is_visible": true,
            "is_active": true,
            "is_progress_visible": false,
            "text": "Pay",
            "color": "#5288c1",
            "text_color": "#ffffff",
        })
    );

    // Repeating a state change is not resent.
    button.show().unwrap().set_text("Pay").unwrap();
    assert_eq!(host.sent().len(), 2);

    button.show_progress().unwrap().disable().unwrap();
    assert!(button.is_progress_visible());
    assert!(!button.is_active());
    assert_eq!(host.sent().len(), 4);

    button.set_color("rgb(0,0,0)").unwrap();
    assert_eq!(host.last().data["color"], json!("#000000"));
}

#[test]
fn main_button_text_length_is_checked() {
    let (host, app) = native_app("6.0");
    let button = app.main_button();
    assert!(button.set_text("   ").is_err());
    assert!(button.set_text(&"x".repeat(65)).is_err());
    assert!(button.set_text(&"x".repeat(64)).is_ok());
    assert_eq!(host.sent().len(), 1);
}

#[test]
fn button_clicks_reach_listeners_until_removed() {
    let (host, app) = native_app("6.1");
    let main_clicks = Arc::new(AtomicUsize::new(0));
    let back_clicks = Arc::new(AtomicUsize::new(0));

    let main: Listener<Event> = {
        let clicks = Arc::clone(&main_clicks);
        Arc::new(move |_: &Event| {
            clicks.fetch_add(1, Ordering::SeqCst);
        })
    };
    let back: Listener<Event> = {
        let clicks = Arc::clone(&back_clicks);
        Arc::new(move |_: &Event| {
            clicks.fetch_add(1, Ordering::SeqCst);
        })
    };
    app.main_button().on_click(main.clone());
    app.back_button().on_click(back.clone());

    host.fire("main_button_pressed", None).unwrap();
    host.fire("back_button_pressed", None).unwrap();
    assert!(app.main_button().off_click(&main));
    assert!(app.back_button().off_click(&back));
    host.fire("main_button_pressed", None).unwrap();

    assert_eq!(main_clicks.load(Ordering::SeqCst), 1);
    assert_eq!(back_clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_delivery_rolls_local_state_back() {
    let (host, app) = native_app("6.2");
    host.fail_delivery(true);

    assert!(matches!(app.main_button().show(), Err(BridgeError::Io(_))));
    assert!(!app.main_button().is_visible());
    assert!(app.back_button().show().is_err());
    assert!(!app.back_button().is_visible());
    assert!(app.set_header_color(SettableColorKey::SecondaryBgColor).is_err());
    assert_eq!(app.header_color().as_deref(), Some("#17212b"));
    assert!(app.set_background_color("#000000").is_err());
    assert_eq!(app.background_color().as_deref(), Some("#17212b"));
    assert!(app.enable_closing_confirmation().is_err());
    assert!(!app.is_closing_confirmation_enabled());

    // The same calls reach the host once delivery works again.
    host.fail_delivery(false);
    app.main_button().show().unwrap();
    app.back_button().show().unwrap();
    app.set_header_color(SettableColorKey::SecondaryBgColor).unwrap();
    app.set_background_color("#000000").unwrap();
    app.enable_closing_confirmation().unwrap();
    assert_eq!(
        host.sent_events(),
        vec![
            "web_app_setup_main_button",
            "web_app_setup_back_button",
            "web_app_set_header_color",
            "web_app_set_background_color",
            "web_app_setup_closing_behavior",
        ]
    );
}
