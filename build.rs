use std::env;

pub fn main() {
    println!("cargo:rustc-check-cfg=cfg(debug)");

    if let Ok(profile) = env::var("PROFILE") {
        if profile == "debug" {
            println!("cargo:rustc-cfg=debug");
        }
    }
}
