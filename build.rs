// build.rs

fn main() {
    // Only the X11 driver needs native libraries. The headless core links nothing.
    if std::env::var_os("CARGO_FEATURE_X11").is_none() {
        return;
    }

    // --- Link against X11 and Xft ---
    // Try pkg-config first, which is the standard way to find library linking
    // information on Unix-like systems. Fall back to plain -l flags otherwise.
    let libraries = ["x11", "xft"];

    let mut pkg_config_success = true;

    for lib in &libraries {
        if pkg_config::probe_library(lib).is_err() {
            eprintln!(
                "pkg-config failed for library '{}'. Falling back to manual linking.",
                lib
            );
            pkg_config_success = false;
            break;
        }
    }

    if !pkg_config_success {
        // Assumes the libraries live in a standard search path.
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-lib=Xft");
        println!("cargo:rustc-link-search=/usr/lib");
        eprintln!("Manual linking flags applied. Ensure X11 and Xft development libraries are installed.");
    }
}
