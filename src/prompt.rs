use std::fmt::Write as _;

use once_cell::sync::Lazy;

use crate::error::TranslateError;

/// Closed vocabulary of safety terms and their fixed Traditional Chinese
/// equivalents (CNS 15598-1).
pub const TERMINOLOGY: &[(&str, &str)] = &[
    ("SELV", "安全特低電壓"),
    ("HAZARDOUS VOLTAGE", "危險電壓"),
    ("BASIC INSULATION", "基本絕緣"),
    ("SUPPLEMENTARY INSULATION", "補充絕緣"),
    ("REINFORCED INSULATION", "加強絕緣"),
    ("DOUBLE INSULATION", "雙重絕緣"),
    ("PROTECTIVE EARTHING", "保護接地"),
    ("FUNCTIONAL EARTHING", "功能接地"),
    ("ENCLOSURE", "外殼"),
    ("ACCESSIBLE PART", "可接觸部位"),
    ("ENERGY SOURCE", "能量來源"),
    ("SAFEGUARD", "安全防護"),
    ("THERMAL CUT-OUT", "熱切斷器"),
    ("THERMAL LINK", "熱熔斷器"),
    ("PROTECTIVE IMPEDANCE", "保護阻抗"),
    ("CURRENT LIMITER", "限流器"),
    ("CREEPAGE DISTANCE", "沿面距離"),
    ("CLEARANCE", "電氣間隙"),
    ("WORKING VOLTAGE", "工作電壓"),
    ("DIELECTRIC STRENGTH", "介電強度"),
    ("TOUCH CURRENT", "接觸電流"),
    ("PROTECTIVE CONDUCTOR CURRENT", "保護導體電流"),
    ("FIRE ENCLOSURE", "防火外殼"),
    ("ORDINARY PERSON", "一般人員"),
    ("INSTRUCTED PERSON", "受指導人員"),
    ("SKILLED PERSON", "熟練人員"),
];

/// Verdict tokens and their only permitted translations.
pub const VERDICTS: &[(&str, &str)] = &[
    ("PASS / P", "符合"),
    ("FAIL / F", "不符合"),
    ("N/A", "不適用"),
];

pub static SYSTEM_PROMPT: Lazy<String> = Lazy::new(build_system_prompt);

fn build_system_prompt() -> String {
    let mut prompt = String::from(
        "你是一位專業嚴謹的安規工程師，專精於 IEC 62368-1 與 CNS 15598-1 (109年版) 標準。\n\
         你的任務是將 CB 測試報告中的英文內容翻譯為繁體中文。\n\n\
         翻譯原則：\n\
         1. 使用 CNS 15598-1 官方標準術語，不可自行創造詞彙\n\
         2. 技術術語必須準確，例如：\n",
    );
    for (source, target) in TERMINOLOGY {
        let _ = writeln!(prompt, "   - {source} → {target}");
    }
    prompt.push_str("3. 判定結果翻譯：\n");
    for (source, target) in VERDICTS {
        let _ = writeln!(prompt, "   - {source} → {target}");
    }
    prompt.push_str(
        "4. 保留數值、單位、型號、標準編號（如 IEC 60950-1）不翻譯\n\
         5. 保留表格編號格式（如 Table 4.1.2 → 表 4.1.2）\n\
         6. 條款編號保持原格式（如 4.2.1、B.3）\n\
         7. 翻譯要簡潔專業，不加額外解釋\n\n\
         只回覆翻譯結果，不要加任何前綴或說明。",
    );
    prompt
}

pub fn user_message(text: &str) -> String {
    format!("翻譯以下內容：\n{text}")
}

const LABELS: &[&str] = &["翻譯：", "翻譯:", "譯文：", "譯文:", "Translation:"];
const QUOTES: &[(char, char)] = &[('"', '"'), ('「', '」'), ('“', '”'), ('\'', '\'')];

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as ```text on the opening line.
    let body = match inner.split_once('\n') {
        Some((info, body)) if !info.trim().contains(' ') => body,
        _ => inner,
    };
    body.trim()
}

/// Reduces a completion to the bare translation: trims, drops a leading
/// label, a surrounding code fence and one pair of matching quotes.
///
/// # Errors
/// Returns [`TranslateError::Malformed`] when nothing is left.
pub fn clean_completion(raw: &str) -> Result<String, TranslateError> {
    let mut text = raw.trim();
    text = strip_code_fence(text);
    for label in LABELS {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim_start();
            break;
        }
    }
    for (open, close) in QUOTES {
        if let Some(inner) = text
            .strip_prefix(*open)
            .and_then(|rest| rest.strip_suffix(*close))
        {
            text = inner.trim();
            break;
        }
    }

    if text.is_empty() {
        return Err(TranslateError::Malformed(
            "completion contained no translation".to_string(),
        ));
    }
    Ok(text.to_string())
}
