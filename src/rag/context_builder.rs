//! Prompt assembly for answer synthesis.
//!
//! Retrieved chunks are concatenated verbatim and wrapped in an analyst
//! prompt scoped to a single entity.

use super::store::ChunkSearchResult;

pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Reply used when an entity has no indexed chunks for the question.
pub fn no_context_message(entity: &str) -> String {
    format!(
        "No se encontró información específica para la entidad '{}' sobre la consulta realizada.",
        entity
    )
}

/// Joins chunk contents in ranking order.
pub fn join_context(results: &[ChunkSearchResult]) -> String {
    results
        .iter()
        .map(|result| result.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

pub fn build_synthesis_prompt(entity: &str, question: &str, raw_context: &str) -> String {
    format!(
        "Actúa como un analista técnico experto en el PDOT de la entidad: {entity}.\n\
         A continuación se te proporciona un texto en bruto extraído del documento de planificación de {entity} y una pregunta del usuario.\n\
         Tu tarea es sintetizar la información del texto en bruto para responder a la pregunta de forma clara y concisa.\n\
         \n\
         PREGUNTA DEL USUARIO:\n\
         {question}\n\
         \n\
         TEXTO EN BRUTO EXTRAÍDO (Fuente: {entity}):\n\
         {raw_context}\n\
         \n\
         RESPUESTA SINTETIZADA (Enfocada en {entity}):\n"
    )
}
