use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("tagratio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run a tag-ratio extraction engine over a web page and render its report")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-k --kind <KIND> "Extraction kind (content, text)")
                .default_value("content")
                .value_parser(["content", "text"]),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (page, report, json)")
                .default_value("page")
                .value_parser(["page", "report", "json"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"emit-archive" "Write the archive entry for a URL instead of running the engine"))
        .arg(clap::arg!(--"content-engine" <PROGRAM> "Content extractor program"))
        .arg(clap::arg!(--"text-engine" <PROGRAM> "Text extractor program"))
        .arg(clap::arg!(--"engine-timeout" <SECS> "Engine timeout in seconds").default_value("60"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--pretty "Pretty print JSON output"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "tagratio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "tagratio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "tagratio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "tagratio", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
