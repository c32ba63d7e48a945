use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=LIBLINEAR_LIB_DIR");
    println!("cargo:rerun-if-env-changed=LIBLINEAR_STATIC");

    if let Ok(dir) = env::var("LIBLINEAR_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }

    let kind = if env::var_os("LIBLINEAR_STATIC").is_some() {
        "static"
    } else {
        "dylib"
    };
    println!("cargo:rustc-link-lib={kind}=linear");

    // liblinear is C++ internally.
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("apple") {
        println!("cargo:rustc-link-lib=dylib=c++");
    } else if !target.contains("windows") {
        println!("cargo:rustc-link-lib=dylib=stdc++");
        println!("cargo:rustc-link-lib=dylib=m");
    }
}
