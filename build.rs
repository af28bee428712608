use std::error::Error;
use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn Error>> {
    // Outside a git checkout (e.g. a packaged tarball) fall back to a fixed describe string
    if EmitBuilder::builder()
        .fail_on_error()
        .git_describe(true, true, None)
        .git_sha(true)
        .emit()
        .is_err()
    {
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
        println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
    }
    Ok(())
}
