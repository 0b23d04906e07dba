fn main() {
    // Re-run this build script whenever TETHER_SERIAL_SOURCES changes so the baked-in
    // value is always in sync with the environment.
    println!("cargo:rerun-if-env-changed=TETHER_SERIAL_SOURCES");

    let val = match std::env::var("TETHER_SERIAL_SOURCES") {
        Ok(v) => v,
        // Not set, the binary will fall back to defaults().
        Err(_) => return,
    };

    // Catch configuration mistakes at compile time rather than at runtime.
    let parsed: serde_json::Value = match serde_json::from_str(&val) {
        Ok(v) => v,
        Err(e) => panic!("TETHER_SERIAL_SOURCES is not valid JSON: {e}\nValue was: {val}"),
    };

    let arr = parsed
        .as_array()
        .unwrap_or_else(|| panic!("TETHER_SERIAL_SOURCES must be a JSON array\nValue was: {val}"));

    for (i, elem) in arr.iter().enumerate() {
        let kind = elem
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_else(|| {
                panic!("TETHER_SERIAL_SOURCES[{i}] needs a string \"type\" field\nValue was: {elem}")
            });

        if !matches!(kind, "env" | "file" | "machine_id") {
            panic!("TETHER_SERIAL_SOURCES[{i}] has unknown type \"{kind}\"\nValue was: {elem}");
        }
    }

    println!("cargo:rustc-env=TETHER_SERIAL_SOURCES={val}");
}
