mod commands;
mod process_command;

pub fn main() -> anyhow::Result<()> {
    process_command::process_command()
}
