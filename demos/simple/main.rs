use std::sync::Arc;

use async_trait::async_trait;
use deployflow::{ChannelEvent, ChannelOptions, EngineBuilder, NodeContext, NodeExecutor, Result, TRIGGER_MANUAL};

struct PrintExecutor;

#[async_trait]
impl NodeExecutor for PrintExecutor {
    async fn execute(
        &self,
        ctx: &NodeContext,
    ) -> Result<()> {
        let node = ctx.node();
        println!("executing {} ({})", node.name, node.id);
        ctx.emit("execute", format!("{} done", node.node_type))
    }
}

fn main() {
    let engine = EngineBuilder::new().executor(Arc::new(PrintExecutor)).build().unwrap();

    engine.launch();

    let workflow = engine.create_workflow("renew example.com");
    let root = workflow.root();

    let apply = engine.menu().into_iter().find(|item| item.key == "apply").and_then(|item| item.action).unwrap();
    let apply = engine.add_node(workflow.id(), &apply.into_command(root.id)).unwrap();

    let picker = engine.picker("deploy");
    for provider in picker.search("cdn") {
        let cmd = picker.resolve(&provider.provider_type, &apply.id);
        engine.add_node(workflow.id(), &cmd).unwrap();
    }

    println!("{}", workflow.schema());

    ChannelEvent::channel(engine.channel(), ChannelOptions::with_workflow(workflow.id())).on_complete(move |run_id, status| {
        println!("Run completed, run_id: {}, status: {}", run_id, status);
    });

    ChannelEvent::channel(engine.channel(), ChannelOptions::with_workflow(workflow.id())).on_error(move |e| {
        println!("Run failed: {:?}", e);
    });

    let run_id = engine.run(workflow.id(), TRIGGER_MANUAL).unwrap();

    loop {
        let run = engine.runs().get_run(&run_id).unwrap();
        if run.is_terminal() {
            println!("Logs: {}", serde_json::to_string_pretty(&run.logs).unwrap());
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    engine.shutdown();
}
