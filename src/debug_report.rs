use mission_forge::{AggregatePool, CompileVerbose, Context, MissionSpec, PoolContent, TokenSummary};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Messages shown before collapsing the rest into "N more".
const SHOWN_PROBLEMS: usize = 5;

pub fn print_run(res: &CompileVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Compiling: \"{}\"", res.text.trim()), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tokens ━━━", ansi::GRAY));
    print_tokens(&res.details.tokens, &palette);

    match &res.result {
        Ok(mission) => {
            println!("\n{}", palette.paint("━━━ Mission ━━━", ansi::GRAY));
            print_mission(mission, &palette);
        }
        Err(err) => {
            println!("\n{}", palette.paint("━━━ Problems ━━━", ansi::GRAY));
            for line in err.summary(SHOWN_PROBLEMS).lines() {
                println!("  {} {}", palette.paint("✗", ansi::RED), line);
            }
        }
    }

    let metrics = &res.details.metrics;
    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Lex: {}  │  Parse: {}  │  Assemble: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", metrics.lex), ansi::CYAN),
        palette.paint(format!("{:?}", metrics.parse), ansi::CYAN),
        palette.dim(format!("{:?}", metrics.assemble)),
    );
    println!();
}

fn print_tokens(tokens: &[TokenSummary], palette: &ansi::Palette) {
    if tokens.is_empty() {
        println!("{}", palette.dim("  No tokens produced"));
        return;
    }
    for token in tokens {
        println!(
            "  {} {} {} {}",
            palette.paint(format!("{}..{}", token.start, token.end), ansi::YELLOW),
            palette.paint(format!("{:<8}", token.kind), ansi::BLUE),
            palette.bold(&token.body),
            palette.dim(&token.preview)
        );
    }
}

fn print_mission(mission: &MissionSpec, palette: &ansi::Palette) {
    println!(
        "  {}  │  pacing {}  │  factory {}  │  rule seed {}",
        palette.bold(&mission.display_name),
        if mission.pacing_events_enabled { "on" } else { "off" },
        mission.factory_mode.map_or("off", |mode| mode.display_name()),
        mission.rule_seed.map_or_else(|| "default".to_string(), |seed| seed.value.to_string()),
    );

    for (idx, bomb) in mission.bombs.iter().enumerate() {
        println!(
            "  {} {} {} {} {}",
            palette.paint(format!("[bomb {}]", idx + 1), ansi::GRAY),
            palette.paint(format_time(bomb.time_limit), ansi::GREEN),
            palette.paint(format!("{} strike(s)", bomb.num_strikes), ansi::GREEN),
            palette.dim("│"),
            palette.paint(format!("{} module(s)", bomb.module_count()), ansi::YELLOW),
        );
        for pool in &bomb.component_pools {
            let unique = if pool.unique { " (unique)" } else { "" };
            println!("      {}x {}{}", pool.count, describe_pool(&pool.content), palette.dim(unique));
        }
        if let Some(profiles) = mission.module_profiles.get(idx).filter(|p| !p.is_empty()) {
            println!("      {} {}", palette.dim("profiles:"), palette.paint(profiles.join(", "), ansi::CYAN));
        }
    }
}

fn describe_pool(content: &PoolContent) -> String {
    match content {
        PoolContent::Aggregate(pool) => pool.description().to_string(),
        PoolContent::Profile { name, needy, modules } => {
            let kind = if *needy { "needy " } else { "" };
            format!("[{kind}profile {name}: {} module(s)]", modules.len())
        }
        PoolContent::Explicit(modules) => modules.iter().map(|m| m.id.as_str()).collect::<Vec<_>>().join(", "),
        PoolContent::ExtraBombs => "[extra bombs]".to_string(),
        PoolContent::SerializedBomb { index, .. } => format!("[bomb {} config]", index + 1),
        PoolContent::FactoryMode => "[factory mode]".to_string(),
    }
}

fn format_time(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if h > 0 { format!("{h}:{m:02}:{s:02}") } else { format!("{m}:{s:02}") }
}

pub fn print_listing(ctx: &Context, color: bool) {
    let palette = ansi::Palette::new(color);

    println!("\n{}", palette.paint("━━━ Pools ━━━", ansi::GRAY));
    for pool in AggregatePool::ALL {
        println!("  {:<24} {}", palette.paint(pool.keyword(), ansi::CYAN), palette.dim(pool.description()));
    }

    println!("\n{}", palette.paint("━━━ Modules ━━━", ansi::GRAY));
    for info in ctx.catalog.entries() {
        println!("  {:<24} {}", palette.paint(&info.id, ansi::BLUE), palette.dim(&info.name));
    }

    let profiles = ctx.profiles.pool_keywords(&ctx.catalog);
    if !profiles.is_empty() {
        println!("\n{}", palette.paint("━━━ Profiles ━━━", ansi::GRAY));
        for info in profiles {
            println!("  {:<24} {}", palette.paint(&info.id, ansi::GREEN), palette.dim(&info.name));
        }
    }
    println!();
}
