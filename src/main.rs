use clutch_display::{config, DisplayState};

#[cfg(target_os = "espidf")]
use anyhow::Context as _;

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use clutch_display::esp::{BspPanel, BspTouch, TwaiBus};
    use clutch_display::input::TouchMonitor;
    use clutch_display::{run_touch_overlay, Context, DisplayHandle};
    use esp_idf_svc::hal::delay::FreeRtos;

    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("Bringing up the display");
    let panel = BspPanel::new().context("Could not start the display")?;
    let display = DisplayHandle::new(panel);
    {
        let mut screen = display.lock(config::DISPLAY_LOCK_TIMEOUT)?;
        screen.set_backlight(true)?;
        screen.set_brightness(config::BRIGHTNESS_PERCENT)?;
        screen.set_background(DisplayState::Neutral.color())?;
    }

    // The touch overlay is a nicety, the display works without it
    match BspTouch::new() {
        Ok(touch) => {
            let monitor = TouchMonitor::spawn(touch, FreeRtos, config::TOUCH_POLL_MS)?;
            let overlay_display = display.clone();
            std::thread::Builder::new()
                .name("overlay".into())
                .spawn(move || run_touch_overlay(&monitor, &overlay_display, config::DISPLAY_LOCK_TIMEOUT))?;
        }
        Err(e) => log::warn!("Touch unavailable, continuing without it: {}", e),
    }

    log::info!("Configuring both TWAI controllers");
    let mut primary = TwaiBus::install(&config::primary_bus()).context("TWAI0 install")?;
    let mut secondary = TwaiBus::install(&config::secondary_bus()).context("TWAI1 install")?;
    primary.start().context("TWAI0 start")?;
    secondary.start().context("TWAI1 start")?;

    let mut context = Context::new(primary, secondary, display)
        .with_receive_timeout(config::RECEIVE_TIMEOUT)
        .with_lock_timeout(config::DISPLAY_LOCK_TIMEOUT);
    context.run()?;

    Ok(())
}

/// On the host, replay candump lines from stdin against an in-memory panel:
///
/// ```sh
/// candump -L can0 | cargo run
/// ```
#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use clutch_display::can::replay::ReplayBus;
    use clutch_display::display::{hex, MemoryPanel};
    use clutch_display::{logging, Context, DisplayHandle};

    logging::setup()?;

    let display = DisplayHandle::new(MemoryPanel::default());
    display.lock(None)?.set_background(DisplayState::Neutral.color())?;

    let primary = ReplayBus::new(0, std::io::stdin().lock());
    let secondary = ReplayBus::new(1, std::io::empty());
    let mut context = Context::new(primary, secondary, display.clone())
        .with_lock_timeout(config::DISPLAY_LOCK_TIMEOUT);
    context.run()?;

    let screen = display.lock(None)?;
    for fill in screen.panel().fills() {
        println!("#{:06X}", fill);
    }
    if let Some(color) = screen.background() {
        println!("Final background #{:06X} after {} lines", hex(color), context.primary().line_no());
    }
    Ok(())
}
