use rand::Rng;

/// Offline fallback question payload. Type classification happens later,
/// in the generator's validation step.
#[derive(Debug, Clone)]
pub struct StubQuestion {
    pub text: String,
    pub keywords: String,
    pub difficulty: i32,
}

const TECH_TERMS: [&str; 10] = [
    "process",
    "thread",
    "database indexing",
    "REST API",
    "authentication",
    "caching",
    "load balancing",
    "microservices",
    "HTTP protocol",
    "Docker container",
];

const SCENARIOS: [&str; 8] = [
    "a production outage",
    "a conflicting requirement",
    "a tight deadline",
    "scaling the system to 10x",
    "optimizing slow database queries",
    "managing teamwork conflicts",
    "debugging a critical bug",
    "handling unexpected edge cases",
];

const TECH_TEMPLATES: [&str; 5] = [
    "Explain how {a} works and give an example.",
    "Describe the difference between {a} and {b} with a real-life example.",
    "How would you troubleshoot issues related to {a}?",
    "Design a small system using {a} and explain the flow.",
    "What are common mistakes developers make with {a}?",
];

const HR_TEMPLATES: [&str; 5] = [
    "Tell me about a time you handled {scenario}.",
    "Describe your strengths and weaknesses in a real situation.",
    "How do you deal with conflicts inside a team?",
    "Why do you think you are a good fit for this role?",
    "Describe your biggest achievement and how you reached it.",
];

const APT_TEMPLATES: [&str; 5] = [
    "If {n} people share {m} items, how many items per person? Explain reasoning.",
    "Solve a real-life problem using ratios or percentages.",
    "Explain how to break a complex problem into smaller steps.",
    "Given a series: 2, 6, 18... find the next term and justify.",
    "How do you approach solving optimization problems?",
];

const BEH_TEMPLATES: [&str; 5] = [
    "Tell me about a time you had to make a quick decision under pressure.",
    "Describe a failure you experienced and what you learned.",
    "How do you motivate yourself during repetitive tasks?",
    "Explain a situation where you took leadership voluntarily.",
    "Describe how you handle criticism or negative feedback.",
];

pub struct StubService;

impl StubService {
    /// Deterministic-family template generator: no network, no failure path.
    pub fn stub(role: &str, difficulty: i32) -> StubQuestion {
        let mut rng = rand::thread_rng();

        let templates: &[&str; 5] = match role {
            "hr" => &HR_TEMPLATES,
            "apt" => &APT_TEMPLATES,
            "beh" => &BEH_TEMPLATES,
            _ => &TECH_TEMPLATES,
        };
        let template = templates[rng.gen_range(0..templates.len())];

        let a_idx = rng.gen_range(0..TECH_TERMS.len());
        let a = TECH_TERMS[a_idx];
        // second term must differ from the first
        let b_idx = (a_idx + rng.gen_range(1..TECH_TERMS.len())) % TECH_TERMS.len();
        let b = TECH_TERMS[b_idx];
        let scenario = SCENARIOS[rng.gen_range(0..SCENARIOS.len())];
        let n = rng.gen_range(2..=20);
        let m = rng.gen_range(5..=100);

        let text = template
            .replace("{a}", a)
            .replace("{b}", b)
            .replace("{scenario}", scenario)
            .replace("{n}", &n.to_string())
            .replace("{m}", &m.to_string())
            .trim()
            .to_string();

        let scenario_head = scenario.split_whitespace().next().unwrap_or("scenario");
        let mut keywords: Vec<String> = Vec::new();
        for kw in [a, b, scenario_head, "explain"] {
            if !kw.is_empty() && keywords.len() < 4 {
                keywords.push(kw.to_lowercase());
            }
        }

        StubQuestion {
            text,
            keywords: keywords.join(","),
            difficulty,
        }
    }
}
