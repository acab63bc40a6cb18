fn main() -> anyhow::Result<()> {
    tts_workbench_lib::run()
}
