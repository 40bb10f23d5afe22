use semver::Version;

pub fn get_version() -> String {
    let semver = env!("CARGO_PKG_VERSION").parse::<Version>();

    match semver {
        // FIXME: vergen reports "VERGEN_IDEMPOTENT_OUTPUT" instead of the sha when built outside
        // of a git checkout (e.g. in CI)
        Ok(semver)
            if env!("VERGEN_GIT_SHA") == "VERGEN_IDEMPOTENT_OUTPUT"
                || env!("VERGEN_GIT_SHA") == "unknown" =>
        {
            semver.to_string()
        }
        Ok(semver) => format!("{} [`{}`]", semver, env!("VERGEN_GIT_SHA")),
        Err(_) => {
            tracing::warn!("couldn't parse a semver out of Cargo.toml? defaulting to 0.0.0-unknown.");
            String::from("0.0.0-unknown")
        }
    }
}
