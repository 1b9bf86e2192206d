pub mod inventory;
pub mod zones;

pub trait Task: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self) -> anyhow::Result<()>;
}
