//! The demo command tree.

use anyhow::{Context as _, bail, ensure};
use cmdtree_core::{App, Arg, Command, Context, Flag, RegistryError, Style};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the demo app with every command registered.
pub fn build_app(style: impl Style + 'static) -> Result<App, RegistryError> {
    let mut app = App::new("cmdtree-demo")
        .with_version(PACKAGE_VERSION)
        .with_description("Demonstrates declarative command trees")
        .with_style(style);

    app.add_flag(Flag::boolean("verbose", "Explain what is being done").with_short('v'))?;

    app.add_command(greet())?;
    let math = app.add_command(
        Command::new("math")
            .with_short("Integer arithmetic")
            .with_long("Folds integer operands with an arithmetic operator."),
    )?;
    app.add_subcommand(math, operator("add", "Sum the operands", Operator::Add))?;
    app.add_subcommand(math, operator("mul", "Multiply the operands", Operator::Mul))?;
    app.add_command(
        Command::new("echo")
            .with_short("Print the parsed invocation as JSON")
            .with_usage("[--label <string>] [WORDS...]")
            .with_flag(Flag::string("label", "Attach a label", false).with_short('l'))
            .with_action(echo),
    )?;
    app.add_command(
        Command::new("inspect")
            .with_short("Print the command tree as JSON")
            .with_action(inspect),
    )?;

    Ok(app)
}

fn greet() -> Command {
    Command::new("greet")
        .with_short("Greet someone")
        .with_long("Prints a greeting for the given name.")
        .with_example("cmdtree-demo greet --name Ana --times 2")
        .with_flag(Flag::string("name", "Who to greet", true).with_short('n'))
        .with_flag(
            Flag::integer("times", "How many times to greet", false)
                .with_short('t')
                .with_default(1_i64),
        )
        .with_flag(
            Flag::string("greeting", "Greeting word", false)
                .with_short('g')
                .with_choices(["hello", "hi", "hey"])
                .with_default("hello"),
        )
        .with_flag(Flag::boolean("shout", "Print in upper case").with_short('s'))
        .with_action(|ctx| {
            let name = ctx.string("name").context("--name is required")?;
            let greeting = ctx.string("greeting").unwrap_or("hello");
            let times = ctx.integer("times").unwrap_or(1);
            ensure!(times >= 1, "--times must be at least 1, got {times}");

            let mut line = format!("{greeting}, {name}!");
            if ctx.boolean("shout") {
                line = line.to_uppercase();
            }
            for _ in 0..times {
                println!("{line}");
            }
            Ok(())
        })
}

#[derive(Debug, Clone, Copy)]
enum Operator {
    Add,
    Mul,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Mul => "*",
        }
    }

    fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Mul => lhs.checked_mul(rhs),
        }
    }
}

const OPERANDS: &str = "OPERANDS";

fn operator(name: &str, short: &str, op: Operator) -> Command {
    Command::new(name)
        .with_short(short)
        .with_example(&format!("cmdtree-demo math {name} 2 3 -4"))
        .with_arg(Arg::required(OPERANDS, "Integers to fold").allow_multiple())
        .with_action(move |ctx| {
            let operands = ctx.values_of(OPERANDS);
            let total = fold(op, operands)?;
            if ctx.boolean("verbose") {
                let joined = operands.join(&format!(" {} ", op.symbol()));
                println!("{joined} = {total}");
            } else {
                println!("{total}");
            }
            Ok(())
        })
}

fn fold(op: Operator, operands: &[String]) -> anyhow::Result<i64> {
    let mut values = operands.iter().map(|raw| {
        raw.parse::<i64>()
            .with_context(|| format!("operand '{raw}' is not an integer"))
    });

    let Some(first) = values.next() else {
        bail!("expected at least one operand");
    };
    values.try_fold(first?, |acc, value| {
        let value = value?;
        op.apply(acc, value)
            .with_context(|| format!("{acc} {} {value} overflows", op.symbol()))
    })
}

fn echo(ctx: &Context<'_>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&ctx.snapshot())?;
    println!("{json}");
    Ok(())
}

fn inspect(ctx: &Context<'_>) -> anyhow::Result<()> {
    println!("{}", ctx.app().describe().to_json()?);
    Ok(())
}
