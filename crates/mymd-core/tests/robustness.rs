//! Mutated-input robustness: compiling damaged documents always terminates,
//! never panics and keeps the diagnostics/document contract.

use mymd_core::{compile, Compiler};

const SEED: u64 = 0x5eed;
const VARIANT_COUNT: usize = 32;
const MAX_MUTATION_STEPS: usize = 4;

const SAMPLE: &str = r#"---
title: "Robustness"
tags: [a, b]
header-includes:
  - \usepackage{amsmath}
---

# Introduction [sec:intro]

This is a paragraph with *emphasis*, **strong text**, `inline code` and
a citation [@knuth84]. See [sec:intro] and [the site](https://example.org).

$$ a^2 + b^2 = c^2 $$ [eq:pyth]

1. First step
   - nested bullet
   - another one
2. Second step

A paragraph between the lists.

(i) roman
(ii) numerals

> A quoted line
> and its continuation.

```rust
fn main() {}
```

\begin{center}
centered
\end{center}

***

Last line with a hard break\
and $x$ math.
"#;

const MUTATIONS: &[&str] = &[
    "drop_code_fence_end",
    "drop_star",
    "drop_backtick",
    "drop_dollar",
    "drop_blank_line",
    "drop_bracket",
    "truncate_tail",
    "indent_noise",
    "control_char",
    "swap_marker",
];

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn choose(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u32() as usize) % max
    }
}

/// Remove one randomly chosen occurrence of `pat`.
fn drop_one(input: &mut String, pat: &str, rng: &mut Lcg) {
    let hits: Vec<usize> = input.match_indices(pat).map(|(i, _)| i).collect();
    if !hits.is_empty() {
        let at = hits[rng.choose(hits.len())];
        input.replace_range(at..at + pat.len(), "");
    }
}

fn floor_char_boundary(input: &str, mut at: usize) -> usize {
    while !input.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn apply_mutations(mut input: String, rng: &mut Lcg) -> String {
    let steps = 1 + rng.choose(MAX_MUTATION_STEPS);
    for _ in 0..steps {
        match MUTATIONS[rng.choose(MUTATIONS.len())] {
            "drop_code_fence_end" => {
                if let Some(pos) = input.rfind("```") {
                    input.replace_range(pos..pos + 3, "");
                }
            }
            "drop_star" => drop_one(&mut input, "*", rng),
            "drop_backtick" => drop_one(&mut input, "`", rng),
            "drop_dollar" => drop_one(&mut input, "$", rng),
            "drop_blank_line" => drop_one(&mut input, "\n\n", rng),
            "drop_bracket" => drop_one(&mut input, "]", rng),
            "truncate_tail" => {
                let len = input.len();
                if len > 8 {
                    let cut = rng.choose(len / 3).max(1);
                    let at = floor_char_boundary(&input, len - cut);
                    input.truncate(at);
                }
            }
            "indent_noise" => {
                input = input.replace("\n-", "\n  -").replace("\n2.", "\n 2.");
            }
            "control_char" => {
                let at = floor_char_boundary(&input, rng.choose(input.len()));
                input.insert(at, '\u{7}');
            }
            "swap_marker" => {
                input = input.replacen("2.", "b)", 1);
            }
            _ => {}
        }
    }
    input
}

fn variants() -> Vec<String> {
    let mut rng = Lcg::new(SEED);
    (0..VARIANT_COUNT)
        .map(|_| apply_mutations(SAMPLE.to_string(), &mut rng))
        .collect()
}

#[test]
fn sample_compiles_cleanly() {
    let result = compile(SAMPLE);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(result.document_json.is_some());
}

#[test]
fn mutated_inputs_keep_the_contract() {
    for variant in variants() {
        for recover in [true, false] {
            let result = Compiler::new().with_recovery(recover).compile(&variant);
            assert_eq!(
                result.diagnostics.is_empty(),
                result.document.is_some(),
                "contract broken for {variant:?}"
            );
            for d in &result.diagnostics {
                assert!(d.start_index <= d.end_index, "{d:?}");
                assert!(d.end_index as usize <= variant.len() + 1, "{d:?}");
            }
        }
    }
}

#[test]
fn recovery_never_reports_fewer_errors() {
    for variant in variants() {
        let recovering = Compiler::new().compile(&variant).diagnostics.len();
        let strict = Compiler::new()
            .with_recovery(false)
            .compile(&variant)
            .diagnostics
            .len();
        assert!(recovering >= strict, "{variant:?}");
    }
}

#[test]
fn every_prefix_compiles() {
    let mut end = 0;
    while end <= SAMPLE.len() {
        let result = compile(&SAMPLE[..end]);
        assert_eq!(result.diagnostics.is_empty(), result.document.is_some());
        end += 1;
        while end < SAMPLE.len() && !SAMPLE.is_char_boundary(end) {
            end += 1;
        }
    }
}

#[test]
fn deeply_nested_links_compile() {
    let depth = 20_000;
    let input = format!("{}a{}", "[".repeat(depth), "](u)".repeat(depth));
    let result = compile(&input);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let json = result.document_json.expect("document");
    assert_eq!(json.matches("\"t\":\"Link\"").count(), 33);
}

#[test]
fn bracket_runs_compile_in_linear_time() {
    let started = std::time::Instant::now();
    let result = compile(&"[".repeat(200_000));
    assert!(result.diagnostics.is_empty());
    assert!(result.document.is_some());
    assert!(
        started.elapsed() < std::time::Duration::from_secs(10),
        "took {:?}",
        started.elapsed()
    );
}
