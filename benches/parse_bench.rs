use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use notafiscal::core::*;
use notafiscal::parse::{clean_xml_content, parse_batch, parse_fiscal_xml};
use notafiscal::report;

const OWN: &str = "05255986000164";

fn config() -> EngineConfig {
    EngineConfig::default().with_own_company(OWN)
}

fn det(n: usize) -> String {
    format!(
        r#"<det nItem="{n}"><prod><cProd>{n:05}</cProd><xProd>CHAPA ACO {n}</xProd><CFOP>6101</CFOP><qCom>{n}.5000</qCom><vUnCom>8.4000</vUnCom></prod><imposto><ICMS><ICMS00><orig>0</orig><vBC>100.00</vBC><pICMS>12.00</pICMS><vICMS>12.00</vICMS></ICMS00></ICMS><IPI><IPITrib><vBC>100.00</vBC><pIPI>3.25</pIPI><vIPI>3.25</vIPI></IPITrib></IPI><PIS><PISAliq><vBC>100.00</vBC><pPIS>1.65</pPIS><vPIS>1.65</vPIS></PISAliq></PIS><COFINS><COFINSAliq><vBC>100.00</vBC><pCOFINS>7.60</pCOFINS><vCOFINS>7.60</vCOFINS></COFINSAliq></COFINS></imposto></det>"#
    )
}

fn invoice_xml(lines: usize) -> String {
    let dets: String = (1..=lines).map(det).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00"><NFe><infNFe Id="NFe35230705255986000164550020000450011123456789" versao="4.00"><ide><nNF>45001</nNF><serie>2</serie><natOp>VENDA</natOp><tpNF>1</tpNF><dhEmi>2023-07-14T10:30:00-03:00</dhEmi></ide><emit><CNPJ>{OWN}</CNPJ><xNome>METAIS SA</xNome></emit><dest><CNPJ>11222333000181</CNPJ><xNome>CLIENTE INDUSTRIAL LTDA</xNome><enderDest><UF>SP</UF></enderDest></dest>{dets}<total><ICMSTot><vBC>1000.00</vBC><vFrete>350.00</vFrete><vNF>17463.84</vNF></ICMSTot></total></infNFe></NFe><protNFe><infProt><cStat>100</cStat><nProt>135230000000001</nProt><xMotivo>Autorizado o uso da NF-e</xMotivo></infProt></protNFe></nfeProc>"#
    )
}

// ── Parsing ────────────────────────────────────────────────────────

fn bench_parse_small(c: &mut Criterion) {
    let xml = invoice_xml(3);
    let config = config();
    c.bench_function("parse_invoice_3_lines", |b| {
        b.iter(|| black_box(parse_fiscal_xml(black_box(&xml), "bench.xml", &config)));
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let xml = invoice_xml(1000);
    let config = config();
    c.bench_function("parse_invoice_1000_lines", |b| {
        b.iter(|| black_box(parse_fiscal_xml(black_box(&xml), "bench.xml", &config)));
    });
}

fn bench_clean(c: &mut Criterion) {
    let xml = invoice_xml(1000).replace("CHAPA ACO", "CHAPA & ACO");
    c.bench_function("clean_xml_1000_lines", |b| {
        b.iter(|| black_box(clean_xml_content(black_box(&xml))));
    });
}

fn bench_batch(c: &mut Criterion) {
    let files: Vec<(String, String)> = (0..100)
        .map(|i| (format!("nfe_{i:03}.xml"), invoice_xml(5)))
        .collect();
    let config = config();
    c.bench_function("parse_batch_100_files", |b| {
        b.iter(|| {
            let inputs = files.iter().map(|(name, xml)| (name.as_str(), xml.as_str()));
            black_box(parse_batch(inputs, &config))
        });
    });
}

// ── Export ─────────────────────────────────────────────────────────

fn bench_csv(c: &mut Criterion) {
    let records = parse_fiscal_xml(&invoice_xml(1000), "bench.xml", &config()).unwrap_or_default();
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    c.bench_function("csv_export_1000_rows", |b| {
        b.iter(|| black_box(report::to_csv(black_box(&records), today)));
    });
}

criterion_group!(
    benches,
    bench_parse_small,
    bench_parse_large,
    bench_clean,
    bench_batch,
    bench_csv,
);
criterion_main!(benches);
