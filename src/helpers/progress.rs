use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use std::time::Duration;

pub(crate) fn create_spinner(msg: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "·    ", "🌱   ", " 🌱  ", "  🌿 ", "   🌿", "  🍃 ", " 🍃  ", "🌳🌳🌳",
            ])
            .template("{msg} {spinner:.green} {elapsed_subsec}")?
            .with_key("elapsed_subsec", elapsed_subsec),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

pub(crate) fn elapsed_subsec(state: &ProgressState, writer: &mut dyn std::fmt::Write) {
    let seconds = state.elapsed().as_secs();
    let sub_seconds = (state.elapsed().as_millis() % 1000) / 100;
    let _ = writer.write_str(&format!("{}.{}s", seconds, sub_seconds));
}
