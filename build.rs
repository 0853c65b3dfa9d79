use std::env;
use std::path::PathBuf;

fn main() {
    // For iOS/macOS targets, link against system frameworks
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("apple") {
        println!("cargo:rustc-link-lib=framework=Foundation");
        println!("cargo:rustc-link-lib=framework=Security");
        println!("cargo:rustc-link-lib=framework=SystemConfiguration");
    }

    // Copy header file next to the built library
    let header_src = "include/cronograma_core.h";
    println!("cargo:rerun-if-changed={}", header_src);

    let Ok(out_dir) = env::var("OUT_DIR") else {
        return;
    };
    let Some(target_dir) = PathBuf::from(out_dir).ancestors().nth(3).map(PathBuf::from) else {
        return;
    };
    if std::path::Path::new(header_src).exists() {
        if let Err(e) = std::fs::copy(header_src, target_dir.join("cronograma_core.h")) {
            println!("cargo:warning=Failed to copy header file: {}", e);
        }
    }
}
