//! Help message display for CLI.

#![allow(clippy::print_stdout)]

use crate::config::Config;

/// Print help message based on configuration state.
pub fn print_smart_help(config: &Config) {
    if needs_setup(config) {
        print_first_time_help();
    } else {
        print_configured_help();
    }
}

/// Whether either model list is still empty.
pub fn needs_setup(config: &Config) -> bool {
    config.detection.is_empty() || config.classification.is_empty()
}

/// Print detailed setup guide for first-time users.
pub fn print_first_time_help() {
    println!("No models configured. Get started with Cervid:");
    println!();
    println!("1. Initialize configuration:");
    println!("   cervid config init");
    println!();
    println!("2. Export your trained YOLO weights to ONNX, e.g. with ultralytics:");
    println!("   yolo export model=detector.pt format=onnx");
    println!("   yolo export model=classifier.pt format=onnx");
    println!();
    println!("3. Add them to the configuration file (see 'cervid config path'):");
    println!();
    println!("   [[detection]]");
    println!("   name = \"yolov8s\"");
    println!("   path = \"/models/detector.onnx\"");
    println!("   labels = \"/models/labels.txt\"");
    println!();
    println!("   [[classification]]");
    println!("   name = \"yolov8m-cls\"");
    println!("   path = \"/models/classifier.onnx\"");
    println!("   labels = \"/models/labels.txt\"");
    println!();
    println!("   Labels files list one class per line in model output order:");
    println!("   deer, muskdeer, roe");
    println!();
    println!("4. Sort a folder of images:");
    println!("   cervid sort ./camera-trap ./classified");
    println!();
    println!("Run 'cervid -h' for all options.");
}

/// Print brief usage reminder for configured users.
pub fn print_configured_help() {
    println!("Usage: cervid sort <SOURCE> <DEST_ROOT> [OPTIONS]");
    println!();
    println!("Example: cervid sort ./camera-trap ./classified -t 0.6 -j 4");
    println!();
    println!("Run 'cervid -h' for all options or 'cervid models list' to see configured models.");
}
