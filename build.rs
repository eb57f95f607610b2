use std::env;

fn main() {
    // The ESP-IDF link arguments only exist when cross compiling the firmware,
    // host builds (unit tests) skip them.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    println!("cargo:rerun-if-changed=components/bsp_bindings.h");
}
