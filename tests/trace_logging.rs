use std::io;
use std::sync::{Arc, Mutex};

use md_debug::{CpuStep, TraceHooks, Tracer, TracerConfig};
use md_disasm::m68k;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn nop(pc: u32) -> CpuStep {
    CpuStep::Inst(m68k::Step {
        pc,
        mnemonic: m68k::Mnemonic::Nop,
        op1: m68k::OperandKind::NoOperand,
        op2: m68k::OperandKind::NoOperand,
        bytes: vec![0x4E, 0x71],
        extra1: m68k::ExtraPayload::default(),
        extra2: m68k::ExtraPayload::default(),
    })
}

#[test]
fn table_lifecycle_is_logged_apart_from_trace_output() {
    let logs = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();

    let out = tracing::subscriber::with_default(subscriber, || {
        let mut tracer = Tracer::new(Vec::new(), TracerConfig::default());
        tracer.cpu_step(&nop(0x0202)).unwrap();
        tracer.cpu_step(&nop(0x0202)).unwrap();
        tracer.clear();
        tracer.into_inner()
    });

    assert!(out.is_empty());
    let logs = logs.text();
    assert!(logs.contains("tracer configured"), "{logs}");
    assert_eq!(logs.matches("allocating trace table").count(), 1, "{logs}");
    assert!(logs.contains("arch=\"m68k\""), "{logs}");
    assert!(logs.contains("released trace table"), "{logs}");
}

#[test]
fn m68k_export_matches_dump() {
    let mut tracer = Tracer::new(Vec::new(), TracerConfig::default());
    for _ in 0..3 {
        tracer.cpu_step(&nop(0x0202)).unwrap();
    }
    tracer.cpu_step(&nop(0x0402)).unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&tracer.m68k().export_json().unwrap()).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["address"], 0x200);
    assert_eq!(entries[0]["hits"], 3);
    assert_eq!(entries[1]["address"], 0x400);

    tracer.dump_insts().unwrap();
    let dump = String::from_utf8(tracer.into_inner()).unwrap();
    let text = entries[1]["text"].as_str().unwrap();
    assert!(dump.contains(&format!("[1] {text}")), "{dump}");
}
