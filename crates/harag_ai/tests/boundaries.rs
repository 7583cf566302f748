use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(p) = stack.pop() {
        let entries = match fs::read_dir(&p) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn harag_core_stays_free_of_model_providers() {
    // Core holds deterministic logic only: no HTTP clients, no generation.
    let core_src = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("harag_core")
        .join("src");
    let files = collect_rs_files(&core_src);
    assert!(!files.is_empty());

    for f in files {
        let text = fs::read_to_string(&f).unwrap_or_default();
        for forbidden in ["ureq", "harag_ai", "Llm", "Embedder"] {
            assert!(
                !text.contains(forbidden),
                "forbidden reference `{forbidden}` found in {}",
                f.display()
            );
        }
    }
}

#[test]
fn only_the_claim_judge_verifier_calls_a_generation_model() {
    let verify_src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src").join("verify");
    let files = collect_rs_files(&verify_src);
    assert!(!files.is_empty());

    for f in files {
        if f.file_name().and_then(|n| n.to_str()) == Some("claims.rs") {
            continue;
        }
        let text = fs::read_to_string(&f).unwrap_or_default();
        assert!(
            !text.contains("crate::llm"),
            "generation model used outside the claim judge in {}",
            f.display()
        );
    }
}
