use cfg_aliases::cfg_aliases;

fn main() {
    // The script doesn't depend on our code
    println!("cargo:rerun-if-changed=build.rs");
    // But it *does* depend on cfgs!
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");
    println!("cargo:rerun-if-env-changed=RUSTDOCFLAGS");

    // Higher level config groups. This way, the short phrase can represent not only that the
    // feature is requested but also available at compile time or documenting. (ie, enabling
    // "xorg-xinput" shouldn't compile err on an unsupported target.)
    cfg_aliases! {
        // Xorg `XInput` is requested and available. Adapted from winit.
        // lonngg cfg = The feature is on, and (docs or (supported platform and not unsupported platform))
        xinput1: { all(feature = "xorg-xinput", any(docsrs, all(unix, not(any(target_os = "redox", target_family = "wasm", target_os = "android", target_os = "ios", target_os = "macos"))))) },
    }
}
