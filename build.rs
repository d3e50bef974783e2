use std::collections::HashSet;
use std::path::Path;

fn main() {
    let config_path = Path::new("config/defaults.json");
    validate_config_file(config_path);
    set_build_dependencies();
}

fn validate_config_file(config_path: &Path) {
    // Ensure config exists at build time
    assert!(
        config_path.exists(),
        "\n\nCONFIG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the default config before building.\n",
        config_path.display()
    );

    let contents = std::fs::read_to_string(config_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCONFIG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            config_path.display()
        );
    });

    let config: serde_json::Value = serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCONFIG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            config_path.display()
        );
    });

    assert!(
        config.is_object(),
        "\n\nCONFIG BUILD ERROR: Root must be a JSON object\n\
         Got: {config}\n"
    );

    let ranks = validate_ranks(&config);
    let classifiers = validate_classifiers(&config);

    println!("cargo:warning=Validated config: {ranks} ranks, {classifiers} classifier formats");
}

fn validate_ranks(config: &serde_json::Value) -> usize {
    let ranks = config
        .get("ranks")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nCONFIG BUILD ERROR: Missing 'ranks' array\n\
                 The default config must list ranks broadest first.\n"
            );
        });

    assert!(
        !ranks.is_empty(),
        "\n\nCONFIG BUILD ERROR: 'ranks' must not be empty\n"
    );

    let mut seen = HashSet::new();
    for (i, rank) in ranks.iter().enumerate() {
        let name = rank.as_str().unwrap_or_else(|| {
            panic!("\n\nCONFIG BUILD ERROR: Rank at index {i} is not a string\n");
        });
        assert!(
            !name.trim().is_empty(),
            "\n\nCONFIG BUILD ERROR: Rank at index {i} is blank\n"
        );
        assert!(
            seen.insert(name),
            "\n\nCONFIG BUILD ERROR: Rank '{name}' is listed more than once\n"
        );
    }

    ranks.len()
}

fn validate_classifiers(config: &serde_json::Value) -> usize {
    let classifiers = config
        .get("classifiers")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nCONFIG BUILD ERROR: Missing 'classifiers' array\n\
                 The default config must describe at least one classifier format.\n"
            );
        });

    let mut names = HashSet::new();
    for (i, classifier) in classifiers.iter().enumerate() {
        let name = classifier
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_else(|| {
                panic!("\n\nCONFIG BUILD ERROR: Classifier at index {i} missing 'name' field\n");
            });

        assert!(
            names.insert(name),
            "\n\nCONFIG BUILD ERROR: Classifier '{name}' is defined more than once\n"
        );

        for column in ["read_column", "taxid_column"] {
            assert!(
                classifier.get(column).and_then(serde_json::Value::as_u64).is_some(),
                "\n\nCONFIG BUILD ERROR: Classifier '{name}' (index {i}) needs a non-negative '{column}'\n"
            );
        }

        if let Some(delimiter) = classifier.get("delimiter") {
            let single_char = delimiter
                .as_str()
                .is_some_and(|d| d.chars().count() == 1);
            assert!(
                single_char,
                "\n\nCONFIG BUILD ERROR: Classifier '{name}' delimiter must be a single character\n\
                 Got: {delimiter}\n"
            );
        }
    }

    classifiers.len()
}

fn set_build_dependencies() {
    // Tell cargo to rerun if the default config changes
    println!("cargo:rerun-if-changed=config/defaults.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
