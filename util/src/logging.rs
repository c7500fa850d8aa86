#[cfg(not(feature = "enable_logging"))]
pub fn logging_setup() {}


#[cfg(feature = "enable_logging")]
pub fn logging_setup() {
    use simplelog::*;
    use std::fs::OpenOptions;
    use std::sync::Once;

    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        if let Ok(file) = OpenOptions::new().append(true).create(true).open("/tmp/grid_seq.log") {
            let config = ConfigBuilder::new().set_time_format_rfc3339().build();
            // another logger may already be installed by the host process, keep it
            let _ = WriteLogger::init(LevelFilter::Info, config, file);
        }

        log_panics::init();
    });
}
