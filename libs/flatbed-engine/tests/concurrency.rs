//! One layout shared by parallel parsing sessions.

use std::sync::Arc;
use std::thread;

use flatbed_engine::{Layout, LayoutConfig, ScriptEngineRegistry, core_registry};
use flatbed_engine::resource::FsResolver;

const LAYOUT: &str = r#"
[[records]]
name = "header"
identities = [{ type = "script", script = 'fn matches_line(ctx, line) { !ctx.has_last_line() }' }]
fields = [{ name = "title", length = 8 }]

[[records]]
name = "even"
identities = [{ type = "script", script = 'fn matches_line(ctx, line) { line.trim(); parse_int(line) % 2 == 0 }' }]
fields = [{ name = "n", length = 6, converter = "long", options = { justify = "right" } }]

[[records]]
name = "odd"
fields = [{ name = "n", length = 6, converter = "long", options = { justify = "right" } }]
"#;

fn shared_layout() -> Arc<Layout> {
    let config = LayoutConfig::parse(LAYOUT).unwrap();
    Arc::new(
        Layout::from_config(&config, core_registry(), &ScriptEngineRegistry::new(), &FsResolver::new())
            .unwrap(),
    )
}

#[test]
fn parallel_sessions_share_one_layout() {
    let layout = shared_layout();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let layout = Arc::clone(&layout);
            thread::spawn(move || {
                let mut ctx = layout.new_context();
                let mut records = vec![layout.decode_line(&mut ctx, "SESSION").unwrap().record];
                for n in 0..200 {
                    let line = format!("{:>6}", worker * 1000 + n);
                    records.push(layout.decode_line(&mut ctx, &line).unwrap().record);
                }
                records
            })
        })
        .collect();

    for handle in handles {
        let records = handle.join().unwrap();
        assert_eq!(records[0], "header");
        for (n, record) in records[1..].iter().enumerate() {
            let expected = if n % 2 == 0 { "even" } else { "odd" };
            assert_eq!(record, expected);
        }
    }
}
