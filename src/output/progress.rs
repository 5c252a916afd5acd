//! Progress bar utilities for batch sorting.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for sorting `total_images` images.
pub fn create_image_progress(total_images: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_images == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_images as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} images ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(pb)
}

/// Advance by one image, showing its file name.
pub fn inc_progress(pb: Option<&ProgressBar>, image_name: &str) {
    if let Some(pb) = pb {
        pb.set_message(image_name.to_string());
        pb.inc(1);
    }
}

/// Finish a progress bar with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}
