use qrtr_ns::config::Config;

fn main() -> anyhow::Result<()> {
    let config = Config::load();
    simple_logger::init_with_level(config.log.level.as_level())?;

    qrtr_ns::startup()
}
