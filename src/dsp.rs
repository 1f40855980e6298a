pub mod oscilloscope;

pub trait Reconfigurable<Cfg> {
    fn update_config(&mut self, config: Cfg);
}
