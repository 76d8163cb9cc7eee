//! Prompt preambles and fixed user-facing messages, all in French — the
//! assistant serves the usagers of a collectivité territoriale.

use guichet_core::types::RetrievalHit;

/// Preamble for the no-retrieval strategy: role, domain scope and the
/// do-not-invent-facts rule.
pub const LLM_ONLY_SYSTEM: &str = "\
Tu es un assistant virtuel pour une collectivité territoriale française.
Tu réponds aux questions des usagers sur les services municipaux :
- État civil (actes de naissance, mariage, décès)
- Urbanisme (permis de construire, déclarations de travaux)
- Déchets (collecte, tri, déchetterie)
- Transports (bus, abonnements)
- Action sociale (CCAS, aides)
- Élections, logement, culture, sport
- Fiscalité locale, eau

Règles :
- Réponds uniquement en français
- Sois précis et concis
- N'invente jamais de faits : si tu ne connais pas la réponse, dis-le clairement
- Si la question sort de ton domaine, indique-le poliment";

/// Preamble for the retrieval-augmented strategy: answer from the supplied
/// extracts only, admit ignorance when they do not suffice.
pub const RAG_SYSTEM: &str = "\
Tu es un assistant pour une collectivité territoriale française.
Réponds à la question de l'usager en t'appuyant UNIQUEMENT sur les extraits de FAQ fournis.
Si les extraits ne permettent pas de répondre, dis-le clairement sans rien inventer.
Réponds en français, de façon précise et concise.";

/// Fixed refusal shown when confidence falls under the threshold.
pub const IGNORANCE_MESSAGE: &str =
    "Je n'ai pas trouvé d'information pertinente dans notre FAQ.";

/// Shown when the backend stayed unreachable through every retry.
pub const BACKEND_FAILURE_MESSAGE: &str =
    "Désolé, je ne peux pas répondre pour le moment.";

/// Phrases a French generative reply uses to admit it does not know.
/// Matched lowercase, used to downgrade the heuristic confidence.
pub const UNCERTAINTY_MARKERS: &[&str] = &[
    "je ne sais pas",
    "je ne peux pas répondre",
    "je n'ai pas cette information",
    "je n'ai pas d'information",
    "hors de mon domaine",
    "hors de ma compétence",
    "je ne suis pas sûr",
    "je ne suis pas certain",
];

/// Whether a generated reply itself admits ignorance.
pub fn admits_ignorance(text: &str) -> bool {
    let lower = text.to_lowercase();
    UNCERTAINTY_MARKERS.iter().any(|m| lower.contains(m))
}

/// Format retrieved entries as numbered FAQ extracts.
pub fn context_block(hits: &[RetrievalHit<'_>]) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "[FAQ {}]\nQ: {}\nR: {}\n",
            i + 1,
            hit.entry.question,
            hit.entry.answer
        ));
    }
    out
}

/// User prompt for the retrieval-augmented strategy.
pub fn rag_prompt(context: &str, question: &str) -> String {
    format!("Extraits de la FAQ :\n{context}\nQuestion de l'usager : {question}")
}
